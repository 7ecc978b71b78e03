use reviewer_repository::{RepositoryError, UnitOfWork, UnitOfWorkFactory};

use crate::{RequestContext, ServiceError};

/// Obtain a unit of work and, if `begin` is set, start its transaction.
/// Gives up with [`ServiceError::Cancelled`] if `ctx` is done first.
pub async fn open(
    factory: &dyn UnitOfWorkFactory,
    ctx: &RequestContext,
    operation: &'static str,
    begin: bool,
) -> Result<Box<dyn UnitOfWork>, ServiceError> {
    if ctx.is_done() {
        log::debug!("{operation}: context done before start");
        return Err(ServiceError::Cancelled);
    }

    let acquire = async {
        let mut uow = factory.create().await?;
        if begin {
            uow.begin().await?;
        }
        Ok::<_, RepositoryError>(uow)
    };

    tokio::select! {
        biased;
        () = ctx.done() => {
            log::debug!("{operation}: context done while opening unit of work");
            Err(ServiceError::Cancelled)
        }
        result = acquire => result.map_err(|error| {
            log::error!("{operation}: cannot open unit of work: {error}");
            ServiceError::Internal(error)
        }),
    }
}

/// Commit on success, roll back on failure, then close.
///
/// A failed commit or rollback replaces the outcome with
/// [`ServiceError::Internal`].
pub async fn finish<T>(
    mut uow: Box<dyn UnitOfWork>,
    operation: &'static str,
    outcome: Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    let result = match outcome {
        Ok(value) => match uow.commit().await {
            Ok(()) => Ok(value),
            Err(error) => {
                log::error!("{operation}: cannot commit transaction: {error}");
                Err(ServiceError::Internal(error))
            }
        },
        Err(failure) => match uow.rollback().await {
            Ok(()) => Err(failure),
            Err(error) => {
                log::error!("{operation}: cannot rollback transaction after '{failure}': {error}");
                Err(ServiceError::Internal(error))
            }
        },
    };

    close(uow, operation).await;
    result
}

pub async fn close(mut uow: Box<dyn UnitOfWork>, operation: &'static str) {
    if let Err(error) = uow.close().await {
        log::warn!("{operation}: cannot close unit of work: {error}");
    }
}
