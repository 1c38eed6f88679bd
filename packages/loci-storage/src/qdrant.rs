use crate::Result;

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &loci_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, vector_dim: cfg.vector_dim })
	}
}
