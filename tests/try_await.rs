//! End-to-end behavior of the combinators over real futures.

use std::future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinError;
use try_await::{try_await, try_await_with, AnyOf2, Caught, Failure, KindSet, Kinds, TryAwaitExt};

#[derive(Error, Debug)]
#[error("{0}")]
struct TransportError(String);

#[derive(Error, Debug)]
#[error("{0}")]
struct PersistenceError(String);

#[derive(Error, Debug)]
#[error("quota exceeded: {limit}")]
struct QuotaError {
    limit: u32,
}

async fn yields<T>(value: T) -> Result<T, TransportError> {
    Ok(value)
}

async fn fails<E>(error: E) -> Result<String, E> {
    Err(error)
}

// ============================================================
// Success
// ============================================================

#[tokio::test]
async fn test_value_without_selector() {
    let caught = try_await(yields("ok")).await;
    assert_eq!(caught.into_pair().1, Some("ok"));
}

#[tokio::test]
async fn test_value_with_selector() {
    let caught = try_await_with(yields(7u8), Kinds::<(PersistenceError,)>::new())
        .await
        .unwrap();
    let (err, value) = caught.into_pair();
    assert!(err.is_none());
    assert_eq!(value, Some(7));
}

#[tokio::test]
async fn test_value_is_the_one_produced() {
    let data = vec![1, 2, 3];
    let ptr = data.as_ptr();
    let back = try_await(yields(data)).await.value().unwrap();
    assert_eq!(back.as_ptr(), ptr);
}

// ============================================================
// Unconditional conversion
// ============================================================

#[tokio::test]
async fn test_any_failure_converted_without_selector() {
    let caught = try_await(fails(QuotaError { limit: 3 })).await;
    let (err, value) = caught.into_pair();
    assert!(value.is_none());
    let err = err.unwrap();
    assert_eq!(err.downcast_ref::<QuotaError>().unwrap().limit, 3);
    assert_eq!(err.message(), "quota exceeded: 3");
}

#[tokio::test]
async fn test_converted_failure_records_catch_site() {
    let err = try_await(fails(TransportError("reset".into())))
        .await
        .failure()
        .unwrap();
    assert_eq!(err.depth(), 1);
    let frame = err.frames().next().unwrap();
    assert!(frame.file.ends_with("try_await.rs"));
}

#[tokio::test]
async fn test_existing_failure_is_not_wrapped_again() {
    let op = async { Err::<(), _>(Failure::wrap(PersistenceError("disk full".into())).context("saving")) };
    let err = try_await(op).await.failure().unwrap();
    assert!(err.is::<PersistenceError>());
    assert_eq!(err.message(), "disk full");
    assert_eq!(err.depth(), 2);
    assert_eq!(err.frames().next().unwrap().context, Some("saving"));
}

// ============================================================
// Selective conversion
// ============================================================

#[tokio::test]
async fn test_listed_kinds_are_narrowed() {
    let caught = try_await_with(
        fails(PersistenceError("disk full".into())),
        Kinds::<(PersistenceError, TransportError)>::new(),
    )
    .await
    .unwrap();

    match caught {
        Caught::Failed(AnyOf2::First(e)) => assert_eq!(e.source_ref().0, "disk full"),
        Caught::Failed(AnyOf2::Second(e)) => panic!("wrong kind: {e}"),
        Caught::Value(v) => panic!("unexpected value: {v}"),
    }
}

#[tokio::test]
async fn test_either_listed_kind_converts() {
    let kinds = Kinds::<(PersistenceError, TransportError)>::new();
    let transport = try_await_with(fails(TransportError("reset".into())), kinds)
        .await
        .unwrap();
    assert!(matches!(transport, Caught::Failed(AnyOf2::Second(_))));

    let persistence = try_await_with(fails(PersistenceError("locked".into())), kinds)
        .await
        .unwrap();
    assert!(matches!(persistence, Caught::Failed(AnyOf2::First(_))));
}

#[tokio::test]
async fn test_unlisted_kind_is_resignaled() {
    let outcome = try_await_with(
        fails(TransportError("reset".into())),
        Kinds::<(PersistenceError,)>::new(),
    )
    .await;
    let err = outcome.unwrap_err();
    assert!(err.is::<TransportError>());
    assert_eq!(err.message(), "reset");
}

#[tokio::test]
async fn test_unrelated_kind_escapes_two_kind_selector() {
    let outcome = try_await_with(
        fails(QuotaError { limit: 1 }),
        Kinds::<(PersistenceError, TransportError)>::new(),
    )
    .await;
    assert!(outcome.unwrap_err().is::<QuotaError>());
}

#[tokio::test]
async fn test_resignaled_failure_keeps_its_trace() {
    let original = Failure::wrap(QuotaError { limit: 9 }).context("reserving");
    let op = async move { Err::<(), _>(original) };
    let err = try_await_with(op, Kinds::<(TransportError,)>::new())
        .await
        .unwrap_err();
    assert_eq!(err.depth(), 1);
    assert_eq!(err.frames().next().unwrap().context, Some("reserving"));
}

#[tokio::test]
async fn test_resignal_propagates_with_question_mark() {
    async fn caller() -> try_await::Result<&'static str> {
        match try_await_with(fails(TransportError("reset".into())), Kinds::<(PersistenceError,)>::new())
            .await?
        {
            Caught::Failed(_) => Ok("persistence"),
            Caught::Value(_) => Ok("value"),
        }
    }

    let err = caller().await.unwrap_err();
    assert!(err.is::<TransportError>());
}

#[tokio::test]
async fn test_kind_set_selector() {
    let kinds = KindSet::of::<TransportError>().or_when(|f: &Failure| f.message().starts_with("quota"));
    let quota = try_await_with(fails(QuotaError { limit: 2 }), &kinds).await.unwrap();
    assert!(quota.is_failed());
    let persistence = try_await_with(fails(PersistenceError("locked".into())), &kinds).await;
    assert!(persistence.is_err());
}

#[tokio::test]
async fn test_kind_set_predicate_sees_failure_as_observed() {
    let kinds = KindSet::when(|f: &Failure| f.depth() == 0);
    let caught = try_await_with(fails(QuotaError { limit: 4 }), &kinds)
        .await
        .unwrap();
    let err = caught.failure().unwrap();
    assert!(err.is::<QuotaError>());
    assert_eq!(err.depth(), 1);
}

#[tokio::test]
async fn test_kind_set_predicate_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let kinds = KindSet::when(move |f: &Failure| {
        counter.fetch_add(1, Ordering::SeqCst);
        f.is::<TransportError>()
    });

    let converted = try_await_with(fails(TransportError("reset".into())), &kinds).await;
    assert!(converted.unwrap().is_failed());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let resignaled = try_await_with(fails(QuotaError { limit: 1 }), &kinds).await;
    assert!(resignaled.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_kind_set_resignal_keeps_trace() {
    let original = Failure::wrap(QuotaError { limit: 6 }).context("reserving");
    let op = async move { Err::<(), _>(original) };
    let kinds = KindSet::when(|f: &Failure| f.depth() == 0);

    let err = try_await_with(op, &kinds).await.unwrap_err();
    assert!(err.is::<QuotaError>());
    assert_eq!(err.depth(), 1);
    assert_eq!(err.frames().next().unwrap().context, Some("reserving"));
}

#[tokio::test]
async fn test_macro_forms() {
    let all = try_await::try_await!(fails(QuotaError { limit: 5 })).await;
    assert!(all.is_failed());

    let listed = try_await::try_await!(fails(TransportError("reset".into())), [TransportError]).await;
    let narrowed = listed.unwrap().failure().unwrap();
    assert_eq!(narrowed.source_ref().0, "reset");
}

#[tokio::test]
async fn test_method_forms() {
    let caught = fails(TransportError("reset".into())).caught().await;
    assert!(caught.is_failed());

    let outcome = fails(TransportError("reset".into()))
        .caught_with(Kinds::<(PersistenceError,)>::new())
        .await;
    assert!(outcome.is_err());
}

// ============================================================
// Concurrency and cancellation
// ============================================================

#[tokio::test]
async fn test_concurrent_invocations_are_independent() {
    let (a, b) = tokio::join!(
        try_await(yields("left")),
        try_await(fails(TransportError("right".into()))),
    );
    assert_eq!(a.value(), Some("left"));
    assert_eq!(b.failure().unwrap().message(), "right");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_runs_on_spawned_tasks() {
    let tasks: Vec<_> = (0..8u32)
        .map(|i| {
            tokio::spawn(try_await(async move {
                if i % 2 == 0 {
                    Ok(i)
                } else {
                    Err(QuotaError { limit: i })
                }
            }))
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let caught = task.await.unwrap();
        if i % 2 == 0 {
            assert_eq!(caught.value(), Some(i as u32));
        } else {
            let err = caught.failure().unwrap();
            assert_eq!(err.downcast_ref::<QuotaError>().unwrap().limit, i as u32);
        }
    }
}

#[tokio::test]
async fn test_cancellation_follows_failure_path() {
    let handle = tokio::spawn(future::pending::<u32>());
    handle.abort();

    let err = try_await(handle).await.failure().unwrap();
    assert!(err.downcast_ref::<JoinError>().unwrap().is_cancelled());
}

#[tokio::test]
async fn test_cancellation_can_be_resignaled() {
    let handle = tokio::spawn(future::pending::<u32>());
    handle.abort();

    let outcome = try_await_with(handle, Kinds::<(TransportError,)>::new()).await;
    assert!(outcome.unwrap_err().is::<JoinError>());
}
