use std::any::Any;

use diesel::SqliteConnection;
use log::error;
use tokio::sync::{mpsc, oneshot};

use super::DbPool;
use crate::errors::StorageError;
use moexfolio_core::errors::{DatabaseError, Error, Result};

// Jobs return core results; the actor erases the value type so one channel
// can carry every kind of write.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;
type ErasedResult = Result<Box<dyn Any + Send + 'static>>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(Job<Box<dyn Any + Send + 'static>>, oneshot::Sender<ErasedResult>)>,
}

impl WriteHandle {
    /// Runs `job` on the writer's connection inside an immediate transaction.
    ///
    /// An `Err` from the job rolls back everything it wrote.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| writer_gone("the writer actor has stopped"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| writer_gone("the writer actor dropped the reply"))??;

        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::Unexpected("writer actor returned an unexpected type".to_string()))
    }
}

fn writer_gone(message: &str) -> Error {
    Error::Database(DatabaseError::TransactionFailed(message.to_string()))
}

/// Spawns the single database writer.
///
/// The actor holds one pooled connection for its whole life and runs jobs
/// one at a time, which serializes every write in the process.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) =
        mpsc::channel::<(Job<Box<dyn Any + Send + 'static>>, oneshot::Sender<ErasedResult>)>(
            1024,
        );

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Writer actor could not get a connection: {}", e);
                while let Some((_, reply_tx)) = rx.recv().await {
                    let _ = reply_tx.send(Err(Error::Database(DatabaseError::ConnectionFailed(
                        e.to_string(),
                    ))));
                }
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: ErasedResult = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(Error::from);

            // The requester may have gone away; nothing to do then.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
