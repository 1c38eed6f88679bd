use std::collections::HashMap;

use qdrant_client::qdrant::{
	PointId, Query, QueryPointsBuilder, ScoredPoint, Value as QdrantValue,
	point_id::PointIdOptions, value::Kind,
};
use serde_json::Value;

use crate::{BoxFuture, RetrievalProvider, search::RetrievedRecord};
use loci_storage::qdrant::QdrantStore;

/// Default retrieval adapter over qdrant. Collection choice stays with the
/// caller; this only runs the nearest-vector query and flattens payloads.
pub(crate) struct QdrantRetrieval {
	store: QdrantStore,
}

impl QdrantRetrieval {
	pub fn new(store: QdrantStore) -> Self {
		Self { store }
	}
}

impl RetrievalProvider for QdrantRetrieval {
	fn query<'a>(
		&'a self,
		collection: &'a str,
		vector: Vec<f32>,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RetrievedRecord>>> {
		Box::pin(async move {
			let request = QueryPointsBuilder::new(collection)
				.query(Query::new_nearest(vector))
				.limit(limit as u64)
				.with_payload(true);
			let response = self.store.client.query(request).await?;

			Ok(response.result.iter().map(to_record).collect())
		})
	}
}

fn to_record(point: &ScoredPoint) -> RetrievedRecord {
	let id = point.id.as_ref().and_then(point_id_label).unwrap_or_default();
	let metadata = payload_to_json(&point.payload);
	let document = metadata
		.get("description")
		.and_then(Value::as_str)
		.unwrap_or_default()
		.to_string();

	RetrievedRecord { id, document, metadata, relevance: point.score.clamp(0.0, 1.0) }
}

fn point_id_label(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		None => None,
	}
}

fn payload_to_json(payload: &HashMap<String, QdrantValue>) -> Value {
	Value::Object(
		payload.iter().map(|(key, value)| (key.clone(), qdrant_value_to_json(value))).collect(),
	)
}

fn qdrant_value_to_json(value: &QdrantValue) -> Value {
	match &value.kind {
		None | Some(Kind::NullValue(_)) => Value::Null,
		Some(Kind::BoolValue(value)) => Value::Bool(*value),
		Some(Kind::IntegerValue(value)) => Value::from(*value),
		Some(Kind::DoubleValue(value)) =>
			serde_json::Number::from_f64(*value).map(Value::Number).unwrap_or(Value::Null),
		Some(Kind::StringValue(value)) => Value::String(value.clone()),
		Some(Kind::ListValue(list)) =>
			Value::Array(list.values.iter().map(qdrant_value_to_json).collect()),
		Some(Kind::StructValue(fields)) => Value::Object(
			fields
				.fields
				.iter()
				.map(|(key, value)| (key.clone(), qdrant_value_to_json(value)))
				.collect(),
		),
	}
}
