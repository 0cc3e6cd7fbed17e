//! Behaviour every backend must share, run against each local backend

use anyhow::Result;
use bytes::Bytes;
use lampo_core::ErrorKind;
use storage::{read_to_bytes, LocalStorage, MemoryStorage, StorageBackend};
use tempfile::TempDir;

async fn read_all(backend: &dyn StorageBackend, path: &str) -> Result<Bytes> {
    let reader = backend.read(path).await?;
    Ok(read_to_bytes(reader).await?)
}

async fn write_then_read(backend: &dyn StorageBackend) -> Result<()> {
    let data = Bytes::from_static(b"\x00\x01binary\xffpayload");
    backend.write("wr/object.bin", data.clone()).await?;
    assert_eq!(read_all(backend, "wr/object.bin").await?, data);
    Ok(())
}

async fn write_is_create_only(backend: &dyn StorageBackend) -> Result<()> {
    backend.write("once", Bytes::from("d1")).await?;
    let err = backend.write("once", Bytes::from("d2")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileExists);
    assert_eq!(&read_all(backend, "once").await?[..], b"d1");
    Ok(())
}

async fn put_replaces(backend: &dyn StorageBackend) -> Result<()> {
    backend.put("put", Bytes::from("d1")).await?;
    backend.put("put", Bytes::from("d2")).await?;
    assert_eq!(&read_all(backend, "put").await?[..], b"d2");
    Ok(())
}

async fn delete_missing(backend: &dyn StorageBackend) -> Result<()> {
    let err = backend.delete("ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);

    let err = backend.read("ghost").await.err().expect("read of missing path");
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
    Ok(())
}

async fn delete_then_recreate(backend: &dyn StorageBackend) -> Result<()> {
    backend.write("cycle", Bytes::from("one")).await?;
    backend.delete("cycle").await?;
    assert!(backend.read("cycle").await.err().unwrap().is_not_found());

    backend.write("cycle", Bytes::from("two")).await?;
    assert_eq!(&read_all(backend, "cycle").await?[..], b"two");
    Ok(())
}

async fn update_semantics(backend: &dyn StorageBackend) -> Result<()> {
    backend.put("upd", Bytes::from("c")).await?;
    backend.update("upd", Bytes::from("a"), false).await?;
    assert_eq!(&read_all(backend, "upd").await?[..], b"ca");

    backend.update("upd", Bytes::from("b"), true).await?;
    assert_eq!(&read_all(backend, "upd").await?[..], b"bca");

    backend.update("fresh-append", Bytes::from("x"), false).await?;
    assert_eq!(&read_all(backend, "fresh-append").await?[..], b"x");

    backend.update("fresh-prepend", Bytes::from("y"), true).await?;
    assert_eq!(&read_all(backend, "fresh-prepend").await?[..], b"y");
    Ok(())
}

async fn empty_payloads(backend: &dyn StorageBackend) -> Result<()> {
    backend.write("empty", Bytes::new()).await?;
    assert!(read_all(backend, "empty").await?.is_empty());

    // An empty object still exists.
    assert!(backend.write("empty", Bytes::new()).await.unwrap_err().is_exists());

    backend.update("empty", Bytes::new(), true).await?;
    assert!(read_all(backend, "empty").await?.is_empty());
    Ok(())
}

async fn run_contract(backend: &dyn StorageBackend) -> Result<()> {
    write_then_read(backend).await?;
    write_is_create_only(backend).await?;
    put_replaces(backend).await?;
    delete_missing(backend).await?;
    delete_then_recreate(backend).await?;
    update_semantics(backend).await?;
    empty_payloads(backend).await?;
    Ok(())
}

#[tokio::test]
async fn memory_backend_honours_contract() -> Result<()> {
    let backend = MemoryStorage::new();
    run_contract(&backend).await
}

#[tokio::test]
async fn local_backend_honours_contract() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let backend = LocalStorage::new(temp_dir.path().join("root")).await?;
    run_contract(&backend).await
}

#[tokio::test]
async fn configured_backends_honour_contract() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let configs = [
        lampo_core::BackendConfig::Memory,
        lampo_core::BackendConfig::Local {
            root: temp_dir.path().to_string_lossy().to_string(),
        },
    ];

    for config in &configs {
        let backend = storage::open_backend(config).await?;
        run_contract(backend.as_ref()).await?;
    }
    Ok(())
}
