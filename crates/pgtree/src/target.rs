use crate::dir::Dir;
use crate::instance::{ConnectParams, Connector, Instance};
use crate::{Error, Result};
use std::sync::Arc;

/// A live instance paired with what a directory says about it.
pub struct Target<I> {
    pub instance: Arc<I>,
    /// Schema declared by the directory, `None` for instance directories
    pub schema: Option<String>,
    /// Scratch schema for staging
    pub temp_schema: String,
}

impl<I: Instance> Target<I> {
    /// Connect to the instance `dir`'s effective config describes.
    pub async fn resolve<C>(connector: &C, dir: &Dir) -> Result<Target<I>>
    where
        C: Connector<Instance = I>,
    {
        let config = dir.config();
        let params = ConnectParams::from_config(config)
            .ok_or_else(|| Error::config(dir.config_path(), "no host configured"))?;
        let instance = connector.connect(&params).await?;
        Ok(Target {
            instance,
            schema: config.schema.clone(),
            temp_schema: config.temp_schema().to_string(),
        })
    }

    /// The schemas this target covers: the declared one, or every live
    /// schema except the temporary one.
    pub async fn schema_names(&self) -> Result<Vec<String>> {
        if let Some(schema) = &self.schema {
            return Ok(vec![schema.clone()]);
        }
        let mut names = self.instance.schema_names().await?;
        names.retain(|name| *name != self.temp_schema);
        Ok(names)
    }
}
