//! The operation abstraction and its closure adapters.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::State;

/// A step in a job: takes the state and produces the next one.
///
/// Synchronous and asynchronous steps share this trait; lift closures with
/// [`operation`] or [`alter_state`].
#[async_trait]
pub trait Operation<C: Send + Sync + 'static>: Send + Sync {
    /// Run the step against `state`.
    async fn apply(&self, state: State<C>) -> Result<State<C>>;
}

/// An operation in a heterogeneous list.
pub type BoxedOperation<C> = Box<dyn Operation<C>>;

#[async_trait]
impl<C, O> Operation<C> for Box<O>
where
    C: Send + Sync + 'static,
    O: Operation<C> + ?Sized,
{
    async fn apply(&self, state: State<C>) -> Result<State<C>> {
        (**self).apply(state).await
    }
}

#[async_trait]
impl<C, O> Operation<C> for Arc<O>
where
    C: Send + Sync + 'static,
    O: Operation<C> + ?Sized,
{
    async fn apply(&self, state: State<C>) -> Result<State<C>> {
        (**self).apply(state).await
    }
}

/// A list of operations runs in order, each one fed the previous result.
#[async_trait]
impl<C> Operation<C> for Vec<BoxedOperation<C>>
where
    C: Send + Sync + 'static,
{
    async fn apply(&self, mut state: State<C>) -> Result<State<C>> {
        for op in self {
            state = op.apply(state).await?;
        }
        Ok(state)
    }
}

/// See [`operation`].
pub struct FnOperation<F>(F);

/// Lift an async closure into an [`Operation`].
pub fn operation<C, F, Fut>(f: F) -> FnOperation<F>
where
    C: Send + Sync + 'static,
    F: Fn(State<C>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<State<C>>> + Send + 'static,
{
    FnOperation(f)
}

#[async_trait]
impl<C, F, Fut> Operation<C> for FnOperation<F>
where
    C: Send + Sync + 'static,
    F: Fn(State<C>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<State<C>>> + Send + 'static,
{
    async fn apply(&self, state: State<C>) -> Result<State<C>> {
        (self.0)(state).await
    }
}

/// See [`alter_state`].
pub struct AlterState<F>(F);

/// Lift a synchronous state transform into an [`Operation`].
pub fn alter_state<C, F>(f: F) -> AlterState<F>
where
    C: Send + Sync + 'static,
    F: Fn(State<C>) -> Result<State<C>> + Send + Sync,
{
    AlterState(f)
}

#[async_trait]
impl<C, F> Operation<C> for AlterState<F>
where
    C: Send + Sync + 'static,
    F: Fn(State<C>) -> Result<State<C>> + Send + Sync,
{
    async fn apply(&self, state: State<C>) -> Result<State<C>> {
        (self.0)(state)
    }
}

/// Build a `Vec` of boxed operations. Nested lists run in place, in order.
///
/// ```rust,ignore
/// let job = steps![
///     create("Account", account_attrs),
///     steps![query("SELECT Id FROM Account"), describe("Contact")],
/// ];
/// ```
#[macro_export]
macro_rules! steps {
    ($($op:expr),* $(,)?) => {
        vec![$(Box::new($op) as $crate::BoxedOperation<_>),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use serde_json::{json, Value};

    type S = State<()>;

    fn record(tag: &'static str) -> impl Operation<()> {
        alter_state(move |s: S| Ok(s.push_reference(json!({ "id": tag }))))
    }

    fn ids(state: &S) -> Vec<Value> {
        state.references.iter().map(|r| r["id"].clone()).collect()
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let job: Vec<BoxedOperation<()>> = steps![record("a"), record("b"), record("c")];
        let state = job.apply(S::default()).await.unwrap();
        assert_eq!(ids(&state), vec![json!("c"), json!("b"), json!("a")]);
    }

    #[tokio::test]
    async fn test_nested_steps_flatten() {
        let job: Vec<BoxedOperation<()>> =
            steps![record("a"), steps![record("b"), record("c")], record("d")];
        let state = job.apply(S::default()).await.unwrap();
        assert_eq!(
            ids(&state),
            vec![json!("d"), json!("c"), json!("b"), json!("a")]
        );
    }

    #[tokio::test]
    async fn test_async_closure_operation() {
        let op = operation(|s: S| async move {
            tokio::task::yield_now().await;
            Ok(s.with_data(json!("done")))
        });
        let state = op.apply(S::default()).await.unwrap();
        assert_eq!(state.data, json!("done"));
    }

    #[tokio::test]
    async fn test_error_stops_the_chain() {
        let fail = alter_state(|_: S| Err(Error::new(ErrorKind::Other("boom".into()))));
        let job: Vec<BoxedOperation<()>> = steps![record("a"), fail, record("b")];
        let err = job.apply(S::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
