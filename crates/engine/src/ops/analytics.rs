use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    AuthContext, CategoryTotal, Dashboard, Period, ResultEngine, Summary, Transaction,
    analytics::{self, DASHBOARD_RECENT},
    transactions,
};

use super::Engine;

impl Engine {
    async fn transactions_in_period(
        &self,
        account_id: &str,
        period: &Period,
    ) -> ResultEngine<Vec<Transaction>> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()));
        if let Some((start, end)) = period.range()? {
            query = query
                .filter(transactions::Column::Date.gte(start))
                .filter(transactions::Column::Date.lt(end));
        }
        query
            .order_by_desc(transactions::Column::Date)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    pub async fn summary(
        &self,
        ctx: &AuthContext,
        account_id: &str,
        period: Period,
    ) -> ResultEngine<Summary> {
        self.require_membership(&self.database, &ctx.user_id, account_id)
            .await?;
        let txs = self.transactions_in_period(account_id, &period).await?;
        analytics::summarize(&txs, &period)
    }

    pub async fn category_analytics(
        &self,
        ctx: &AuthContext,
        account_id: &str,
        period: Period,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        self.require_membership(&self.database, &ctx.user_id, account_id)
            .await?;
        let txs = self.transactions_in_period(account_id, &period).await?;
        analytics::expenses_by_category(&txs)
    }

    /// Summary, category breakdown and the latest transactions in one call.
    pub async fn dashboard(
        &self,
        ctx: &AuthContext,
        account_id: &str,
        period: Period,
    ) -> ResultEngine<Dashboard> {
        self.require_membership(&self.database, &ctx.user_id, account_id)
            .await?;
        let txs = self.transactions_in_period(account_id, &period).await?;
        let recent = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(transactions::Column::Date)
            .limit(DASHBOARD_RECENT)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Dashboard {
            summary: analytics::summarize(&txs, &period)?,
            categories: analytics::expenses_by_category(&txs)?,
            recent,
        })
    }
}
