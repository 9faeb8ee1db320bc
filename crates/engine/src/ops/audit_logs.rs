use std::collections::HashMap;

use sea_orm::{QueryFilter, QueryOrder, prelude::*};

use crate::{
    AuditLog, AuditLogDetail, AuditLogFilter, AuditPerformer, AuthContext, EngineError,
    ResultEngine, audit, users,
};

use super::Engine;

impl Engine {
    /// Audit trail of an account, newest first.
    pub async fn list_audit_logs(
        &self,
        ctx: &AuthContext,
        account_id: &str,
        filter: AuditLogFilter,
    ) -> ResultEngine<Vec<AuditLogDetail>> {
        self.require_membership(&self.database, &ctx.user_id, account_id)
            .await?;

        let mut query =
            audit::Entity::find().filter(audit::Column::AccountId.eq(account_id.to_string()));
        if let Some(action) = filter.action {
            query = query.filter(audit::Column::Action.eq(action.as_str()));
        }
        if let Some(entity_type) = filter.entity_type {
            query = query.filter(audit::Column::EntityType.eq(entity_type));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(audit::Column::CreatedAt.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(audit::Column::CreatedAt.lte(end));
        }
        let logs = query
            .order_by_desc(audit::Column::CreatedAt)
            .all(&self.database)
            .await?;

        let ids: Vec<String> = logs.iter().map(|l| l.performed_by_id.clone()).collect();
        let performers: HashMap<String, AuditPerformer> = users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|u| {
                (
                    u.id.clone(),
                    AuditPerformer {
                        id: u.id,
                        name: u.name,
                        email: u.email,
                    },
                )
            })
            .collect();

        logs.into_iter()
            .map(|log| {
                let performed_by = performers.get(&log.performed_by_id).cloned();
                Ok(AuditLogDetail {
                    log: AuditLog::try_from(log)?,
                    performed_by,
                })
            })
            .collect()
    }

    pub async fn get_audit_log(
        &self,
        ctx: &AuthContext,
        account_id: &str,
        log_id: &str,
    ) -> ResultEngine<AuditLogDetail> {
        self.require_membership(&self.database, &ctx.user_id, account_id)
            .await?;
        let log = audit::Entity::find_by_id(log_id.to_string())
            .filter(audit::Column::AccountId.eq(account_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("Audit log".to_string()))?;
        let performed_by = users::Entity::find_by_id(log.performed_by_id.clone())
            .one(&self.database)
            .await?
            .map(|u| AuditPerformer {
                id: u.id,
                name: u.name,
                email: u.email,
            });
        Ok(AuditLogDetail {
            log: AuditLog::try_from(log)?,
            performed_by,
        })
    }
}
