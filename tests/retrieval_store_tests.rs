mod common;

use common::{embedder, open_store, words};
use docent::rag::TextChunker;
use docent::types::AppError;
use tempfile::TempDir;

#[tokio::test]
async fn test_chunk_text_recalls_its_document() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path(), embedder()).await;

    let doc = words("alpha", 200);
    store.upsert("a", &doc).await.unwrap();
    store.upsert("b", &words("beta", 120)).await.unwrap();
    store.upsert("c", &words("gamma", 80)).await.unwrap();

    let chunks = TextChunker::new(50, 10).unwrap().chunk(&doc);
    assert!(chunks.len() > 2);
    for chunk in &chunks {
        let results = store.search(chunk, 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, "a");
        assert_eq!(results[0].content, doc);
    }
}

#[tokio::test]
async fn test_removed_document_never_returned() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path(), embedder()).await;

    store.upsert("a", &words("alpha", 120)).await.unwrap();
    store.upsert("b", &words("beta", 120)).await.unwrap();
    let before = store.stats();

    assert!(store.remove_document("a").await.unwrap());
    assert!(!store.contains("a"));

    for query in [words("alpha", 50), words("beta", 50)] {
        let results = store.search(&query, 100).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|p| p.doc_id == "b"));
    }

    let after = store.stats();
    assert_eq!(after.documents, before.documents - 1);

    // second removal is a no-op
    assert!(!store.remove_document("a").await.unwrap());
    assert_eq!(store.stats(), after);
}

#[tokio::test]
async fn test_replace_leaves_no_orphan_vectors() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path(), embedder()).await;

    store.upsert("a", &words("alpha", 200)).await.unwrap();
    store.upsert("b", &words("beta", 30)).await.unwrap();
    assert_eq!(store.stats().vectors, 5 + 1);

    let replacement = words("delta", 20);
    assert_eq!(store.replace_document("a", &replacement).await.unwrap(), 1);
    assert_eq!(store.stats().vectors, 2);

    let results = store.search(&words("alpha", 50), 100).await.unwrap();
    let hits_for_a: Vec<_> = results.iter().filter(|p| p.doc_id == "a").collect();
    assert_eq!(hits_for_a.len(), 1);
    assert_eq!(hits_for_a[0].content, replacement);
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let embedder = embedder();

    {
        let store = open_store(dir.path(), embedder.clone()).await;
        store.upsert("a", &words("alpha", 120)).await.unwrap();
        store.upsert("b", &words("beta", 60)).await.unwrap();
        store.remove_document("a").await.unwrap();
    }

    for file in ["index.bin", "metadata.json", "doc_id_map.json"] {
        assert!(dir.path().join(file).exists(), "{} missing", file);
    }

    let reopened = open_store(dir.path(), embedder).await;
    assert_eq!(reopened.document_ids(), vec!["b".to_string()]);
    let results = reopened.search(&words("beta", 50), 3).await.unwrap();
    assert_eq!(results[0].doc_id, "b");
}

#[tokio::test]
async fn test_embedding_failure_leaves_store_unchanged() {
    let dir = TempDir::new().unwrap();
    let embedder = embedder();
    let store = open_store(dir.path(), embedder.clone()).await;
    store.upsert("a", &words("alpha", 60)).await.unwrap();
    let before = store.stats();

    embedder.set_failing(true);
    let err = store
        .replace_document("a", &words("omega", 60))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmbeddingUnavailable(_)));
    assert!(matches!(
        store.upsert("z", "anything").await,
        Err(AppError::EmbeddingUnavailable(_))
    ));
    assert!(matches!(
        store.search("alpha0", 3).await,
        Err(AppError::EmbeddingUnavailable(_))
    ));
    assert_eq!(store.stats(), before);

    embedder.set_failing(false);
    let results = store.search(&words("alpha", 50), 1).await.unwrap();
    assert_eq!(results[0].content, words("alpha", 60));
}

#[tokio::test]
async fn test_zero_k_and_empty_store() {
    let dir = TempDir::new().unwrap();
    let embedder = embedder();
    let store = open_store(dir.path(), embedder.clone()).await;

    assert!(store.search("anything", 5).await.unwrap().is_empty());
    store.upsert("a", &words("alpha", 10)).await.unwrap();

    let calls = embedder.calls();
    assert!(store.search("alpha0", 0).await.unwrap().is_empty());
    assert_eq!(embedder.calls(), calls);
}

#[tokio::test]
async fn test_concurrent_writers() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path(), embedder()).await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .upsert(&format!("doc-{}", i), &words(&format!("w{}x", i), 70))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.stats().documents, 8);
    for i in 0..8 {
        let results = store
            .search(&words(&format!("w{}x", i), 50), 1)
            .await
            .unwrap();
        assert_eq!(results[0].doc_id, format!("doc-{}", i));
    }
}

#[tokio::test]
async fn test_persistence_failure_keeps_memory_authoritative() {
    let dir = TempDir::new().unwrap();
    let index_dir = dir.path().join("index");
    let store = open_store(&index_dir, embedder()).await;
    store.upsert("a", &words("alpha", 40)).await.unwrap();

    std::fs::remove_dir_all(&index_dir).unwrap();
    std::fs::write(&index_dir, b"not a directory").unwrap();

    let err = store.upsert("b", &words("beta", 40)).await.unwrap_err();
    assert!(matches!(err, AppError::Persistence(_)));
    assert!(err.is_non_fatal());
    assert!(store.contains("b"));
    let results = store.search(&words("beta", 40), 1).await.unwrap();
    assert_eq!(results[0].doc_id, "b");

    let err = store.remove_document("a").await.unwrap_err();
    assert!(err.is_non_fatal());
    assert_eq!(store.document_ids(), vec!["b"]);
}
