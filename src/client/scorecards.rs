use serde_json::Value;

use super::{ApiPath, PortClient, extract};
use crate::api::{ApiFuture, ScorecardsApi};
use crate::schema::JsonObject;

impl ScorecardsApi for PortClient {
    fn get_scorecards(&self) -> ApiFuture<'_, Vec<Value>> {
        Box::pin(async move {
            tracing::info!("getting all scorecards from Port");
            let body = self.get(&ApiPath::new(["scorecards"])).await?;
            extract(body, "scorecards", "scorecards")
        })
    }

    fn get_scorecard<'a>(&'a self, blueprint: &'a str, scorecard: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(blueprint = %blueprint, scorecard = %scorecard, "getting scorecard");
            let path = ApiPath::new(["blueprints", blueprint, "scorecards", scorecard]);
            let body = self.get(&path).await?;
            extract(body, "scorecard", path)
        })
    }

    fn create_scorecard<'a>(
        &'a self,
        blueprint: &'a str,
        scorecard: JsonObject,
    ) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(blueprint = %blueprint, scorecard = ?scorecard.get("identifier"), "creating scorecard");
            let path = ApiPath::new(["blueprints", blueprint, "scorecards"]);
            let body = self.post(&path, Value::Object(scorecard)).await?;
            extract(body, "scorecard", path)
        })
    }

    fn update_scorecard<'a>(
        &'a self,
        blueprint: &'a str,
        scorecard_identifier: &'a str,
        mut scorecard: JsonObject,
    ) -> ApiFuture<'a, Value> {
        Box::pin(async move {
            tracing::info!(blueprint = %blueprint, scorecard = %scorecard_identifier, "updating scorecard");
            scorecard
                .entry("identifier")
                .or_insert_with(|| Value::String(scorecard_identifier.to_string()));
            let path = ApiPath::new(["blueprints", blueprint, "scorecards", scorecard_identifier]);
            let body = self.put(&path, Value::Object(scorecard)).await?;
            extract(body, "scorecard", path)
        })
    }

    fn delete_scorecard<'a>(&'a self, blueprint: &'a str, scorecard: &'a str) -> ApiFuture<'a, bool> {
        Box::pin(async move {
            tracing::info!(blueprint = %blueprint, scorecard = %scorecard, "deleting scorecard");
            self.delete(&ApiPath::new(["blueprints", blueprint, "scorecards", scorecard]), &[])
                .await?;
            Ok(true)
        })
    }
}
