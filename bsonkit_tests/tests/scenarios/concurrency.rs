use super::fixtures::{self, Bag, CountingDefinition, BAG};
use super::round_trip;
use anyhow::Result;
use bsonkit_serializers::BsonSerializer;
use itertools::Itertools;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;

pub fn test_concurrent_closing() -> Result<()> {
    let registry = fixtures::registry()?;
    let definition = Arc::new(CountingDefinition::default());
    registry.register_generic_definition(BAG, definition.clone())?;

    let barrier = Barrier::new(THREADS);
    let handles = thread::scope(|s| {
        let (barrier, registry) = (&barrier, &registry);
        let workers = (0..THREADS)
            .map(|_| {
                s.spawn(move || {
                    barrier.wait();
                    registry.lookup::<Bag<Option<i64>>>()
                })
            })
            .collect::<Vec<_>>();
        workers
            .into_iter()
            .map(|worker| -> Result<Arc<dyn BsonSerializer>> {
                worker
                    .join()
                    .map_err(|_| anyhow::anyhow!("lookup thread panicked"))?
                    .map_err(anyhow::Error::from)
            })
            .collect::<Result<Vec<_>>>()
    })?;

    assert_eq!(handles.len(), THREADS);
    assert!(handles.iter().tuple_windows().all(|(a, b)| Arc::ptr_eq(a, b)));
    assert_eq!(definition.closings(), 1);

    // Serializing from many threads shares the same handle.
    thread::scope(|s| {
        let workers = (0..THREADS as i64)
            .map(|i| {
                let registry = &registry;
                s.spawn(move || round_trip(registry, Bag(vec![Some(i), None]), None))
            })
            .collect::<Vec<_>>();
        workers.into_iter().try_for_each(|worker| -> Result<()> {
            worker
                .join()
                .map_err(|_| anyhow::anyhow!("serializing thread panicked"))?
        })
    })?;
    assert!(Arc::ptr_eq(&handles[0], &registry.lookup::<Bag<Option<i64>>>()?));
    assert_eq!(definition.closings(), 1);
    Ok(())
}
