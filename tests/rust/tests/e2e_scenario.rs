//! End-to-end flows through the facade, plus memory backend concurrency

use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use lampo::{read_to_bytes, Event, EventType, Lampo, LocalStorage, MemoryStorage};
use parking_lot::Mutex;
use storage::StorageBackend;

async fn read_string(lampo: &Lampo, path: &str) -> Result<String> {
    let reader = lampo.read(path).await?;
    Ok(String::from_utf8(read_to_bytes(reader).await?.to_vec())?)
}

fn record_events(lampo: &Lampo) -> Arc<Mutex<Vec<Event>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    lampo.on(move |event| sink.lock().push(event.clone()));
    events
}

#[tokio::test]
async fn test_memory_lifecycle() -> Result<()> {
    let lampo = Lampo::new(MemoryStorage::new());

    lampo.write("f", Bytes::from("Hello")).await?;
    assert_eq!(read_string(&lampo, "f").await?, "Hello");

    lampo.update("f", Bytes::from(", World"), false).await?;
    assert_eq!(read_string(&lampo, "f").await?, "Hello, World");

    lampo.update("f", Bytes::from(">> "), true).await?;
    assert_eq!(read_string(&lampo, "f").await?, ">> Hello, World");

    lampo.delete("f").await?;
    let err = lampo.read("f").await.err().expect("deleted file must not be readable");
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_local_lifecycle_with_events() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let lampo = Lampo::new(LocalStorage::new(temp_dir.path()).await?);
    let events = record_events(&lampo);

    lampo.write("example.txt", Bytes::from("Hello, Local World!")).await?;
    lampo.update("example.txt", Bytes::from(" - Appended"), false).await?;
    assert_eq!(
        read_string(&lampo, "example.txt").await?,
        "Hello, Local World! - Appended"
    );

    lampo.put("example.txt", Bytes::from("New content")).await?;
    assert_eq!(read_string(&lampo, "example.txt").await?, "New content");

    lampo.delete("example.txt").await?;
    assert!(lampo.delete("example.txt").await.unwrap_err().is_not_found());

    let types: Vec<EventType> = events.lock().iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![
            EventType::Write,
            EventType::Append,
            EventType::Read,
            EventType::Put,
            EventType::Read,
            EventType::Delete,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_two_listeners_see_one_write() -> Result<()> {
    let lampo = Lampo::new(MemoryStorage::new());
    let calls = Arc::new(Mutex::new(Vec::new()));

    for id in 1..=2 {
        let calls = Arc::clone(&calls);
        lampo.on(move |event| calls.lock().push((id, event.clone())));
    }

    lampo.write("a", Bytes::from("12345")).await?;
    assert!(lampo.write("a", Bytes::from("again")).await.is_err());

    let calls = calls.lock();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, 1);
    assert_eq!(calls[1].0, 2);
    for (_, event) in calls.iter() {
        assert_eq!(event.event_type, EventType::Write);
        assert_eq!(event.path, "a");
        assert_eq!(event.data, Some(5));
        assert!(event.timestamp > 0);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_memory_concurrent_readers_agree() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());
    let content = Bytes::from(vec![7u8; 64 * 1024]);
    storage.write("shared", content.clone()).await?;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            let reader = storage.read("shared").await?;
            read_to_bytes(reader).await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await??, content);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_memory_readers_never_see_torn_updates() -> Result<()> {
    const SIZE: usize = 32 * 1024;
    const ROUNDS: u8 = 50;

    let storage = Arc::new(MemoryStorage::new());
    storage.put("obj", Bytes::from(vec![0u8; SIZE])).await?;

    let writer = {
        let storage = Arc::clone(&storage);
        tokio::spawn(async move {
            for round in 1..=ROUNDS {
                storage.put("obj", Bytes::from(vec![round; SIZE])).await?;
                tokio::task::yield_now().await;
            }
            Ok::<_, lampo::Error>(())
        })
    };

    let mut readers = Vec::new();
    for _ in 0..8 {
        let storage = Arc::clone(&storage);
        readers.push(tokio::spawn(async move {
            for _ in 0..ROUNDS {
                let data = read_to_bytes(storage.read("obj").await?).await?;
                assert_eq!(data.len(), SIZE);
                let first = data[0];
                assert!(data.iter().all(|b| *b == first), "torn read observed");
                tokio::task::yield_now().await;
            }
            Ok::<_, lampo::Error>(())
        }));
    }

    writer.await??;
    for reader in readers {
        reader.await??;
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_memory_concurrent_writes_single_winner() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());

    let mut handles = Vec::new();
    for id in 0..16u8 {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            storage.write("contended", Bytes::from(vec![id])).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await? {
            Ok(()) => winners += 1,
            Err(e) => assert!(e.is_exists()),
        }
    }
    assert_eq!(winners, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_memory_concurrent_appends_all_land() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());

    let mut handles = Vec::new();
    for _ in 0..32 {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            storage.update("log", Bytes::from_static(b"ab"), false).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let data = read_to_bytes(storage.read("log").await?).await?;
    assert_eq!(data.len(), 64);
    assert!(data.chunks(2).all(|chunk| chunk == b"ab"));
    Ok(())
}
