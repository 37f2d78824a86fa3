use crate::error::AwaytixError;
use crate::shared::auth::protect_admin_route;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpRequest, HttpResponse};
use awaytix_api_structs::rearm_notification::{APIResponse, PathParams};
use awaytix_domain::{Notification, NotificationEvent, ID};
use awaytix_infra::Context;

pub async fn rearm_notification_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, AwaytixError> {
    protect_admin_route(&http_req, &ctx)?;

    let usecase = RearmNotificationUseCase {
        notification_id: path_params.notification_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|notification| HttpResponse::Ok().json(APIResponse::new(notification)))
        .map_err(AwaytixError::from)
}

/// Puts a failed notification back into `scheduled` so the sweep picks
/// it up again. Only allowed while the target instant is not long past;
/// beyond that the reminder is pointless and the failure stands.
#[derive(Debug)]
pub struct RearmNotificationUseCase {
    pub notification_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    NotRearmable,
    StorageError,
}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(notification_id) => Self::NotFound(format!(
                "The notification with id: {}, was not found.",
                notification_id
            )),
            UseCaseError::NotRearmable => {
                Self::Conflict("The notification cannot be re-armed".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for RearmNotificationUseCase {
    type Response = Notification;

    type Error = UseCaseError;

    const NAME: &'static str = "RearmNotification";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let notification = ctx
            .repos
            .notifications
            .find(&self.notification_id)
            .await
            .ok_or_else(|| UseCaseError::NotFound(self.notification_id.clone()))?;

        let rearmed = notification
            .transition(NotificationEvent::Rearm {
                at: ctx.sys.get_timestamp_millis(),
            })
            .map_err(|_| UseCaseError::NotRearmable)?;

        ctx.repos
            .notifications
            .save(&rearmed)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(rearmed)
    }
}
