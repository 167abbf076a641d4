//! Concurrent accessor cache integration tests for jbind-core

use jbind_core::accessor::{self, AccessorCache};
use jbind_core::{Error, HasMethodAndParams, Message, RequestMessage, ResponseMessage};
use serde_json::json;
use std::sync::{Arc, Barrier};

type Sum = RequestMessage<Vec<i64>>;

const TASKS: usize = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_racing_lookups_share_one_accessor() {
    let cache = Arc::new(AccessorCache::new());
    let barrier = Arc::new(Barrier::new(TASKS));

    let mut handles = Vec::new();
    for _ in 0..TASKS {
        let cache = Arc::clone(&cache);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::task::spawn_blocking(move || {
            barrier.wait();
            cache.get::<Sum>("method").unwrap()
        }));
    }

    let mut accessors = Vec::new();
    for handle in handles {
        accessors.push(handle.await.unwrap());
    }

    let first = &accessors[0];
    assert!(accessors.iter().all(|a| Arc::ptr_eq(a, first)));
    assert_eq!(cache.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_get_and_set() {
    let cache = Arc::new(AccessorCache::new());

    let mut handles = Vec::new();
    for i in 0..TASKS as i64 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            let mut request = Sum::new("sum", Some(vec![i]), i).unwrap();

            let params = cache.get::<Sum>("params").unwrap();
            assert_eq!(params.get(&request).unwrap(), Some(json!([i])));

            let method = cache.get_for(&request, "method").unwrap();
            method.set(&mut request, Some(json!(format!("sum{}", i)))).unwrap();
            request
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let request = handle.await.unwrap();
        assert_eq!(request.method(), format!("sum{}", i));
    }

    // One entry per (type, property)
    assert_eq!(cache.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_types_do_not_collide() {
    let cache = Arc::new(AccessorCache::new());

    let request_cache = Arc::clone(&cache);
    let request_task = tokio::spawn(async move { request_cache.get::<Sum>("id").unwrap() });
    let response_cache = Arc::clone(&cache);
    let response_task = tokio::spawn(async move {
        response_cache.get::<ResponseMessage<i64>>("id").unwrap()
    });

    let request_id = request_task.await.unwrap();
    let response_id = response_task.await.unwrap();

    assert!(!Arc::ptr_eq(&request_id, &response_id));
    assert_ne!(request_id.type_tag(), response_id.type_tag());
    assert_eq!(cache.len(), 2);

    // Applying one type's accessor to the other type is refused
    let response = ResponseMessage::<i64>::resolved(1, 1i64).unwrap();
    let err = request_id.get(&response).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

#[test]
fn test_global_helpers() {
    let mut request = Sum::new("sum", Some(vec![1, 2]), "a").unwrap();

    accessor::set_property(&mut request, "id", Some(json!(9))).unwrap();
    assert_eq!(accessor::get_property(&request, "id").unwrap(), Some(json!(9)));

    let a = accessor::accessor::<Sum>("jsonrpc").unwrap();
    let b = accessor::accessor_for(&request, "jsonrpc").unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let err = accessor::get_property(&request, "result").unwrap_err();
    assert!(matches!(err, Error::NoSuchProperty { .. }));

    let boxed: Box<dyn Message> = Box::new(request.clone());
    assert!(accessor::messages_equal(boxed.as_ref(), &request));
}
