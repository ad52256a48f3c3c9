use std::sync::Arc;

use crate::adapters::toml_config::AppConfig;
use crate::adapters::{
    ContainerMetadataAdapter, FsLocalAdapter, HachoirMetadataAdapter, LibavMediaPort,
    NoCreationTime, SystemClock,
};
use crate::app::{
    batch_interactor::BatchInteractor,
    split_interactor::{SplitInteractor, SplitOptions},
};
use crate::domain::model::CreationTimeSource;
use crate::domain::rules::VideoExtensions;
use crate::error::SplitResult;
use crate::ports::{ClockPort, CreationTimePort, FsPort, MediaPort};

pub trait AppContainer {
    fn split_interactor(&self) -> Arc<SplitInteractor>;
    fn batch_interactor(&self) -> Arc<BatchInteractor>;
}

/// Wires the production adapters from a loaded configuration
pub struct DefaultAppContainer {
    split_interactor: Arc<SplitInteractor>,
    batch_interactor: Arc<BatchInteractor>,
}

impl DefaultAppContainer {
    pub fn new(config: &AppConfig, dry_run: bool) -> SplitResult<Self> {
        let media_port: Arc<dyn MediaPort> = Arc::new(LibavMediaPort::new(
            config.split.mode,
            config.encoding.clone(),
        )?);
        let creation_port = Self::creation_port(config)?;
        let clock_port: Arc<dyn ClockPort> = Arc::new(SystemClock);
        let fs_port: Arc<dyn FsPort> = Arc::new(FsLocalAdapter::new());

        let options = SplitOptions {
            overwrite: config.split.overwrite,
            create_output_dir: config.split.create_output_dir,
            min_tail_seconds: config.split.min_tail_seconds,
            dry_run,
        };

        let split_interactor = Arc::new(SplitInteractor::new(
            media_port,
            creation_port,
            clock_port,
            Arc::clone(&fs_port),
            options,
        ));

        let batch_interactor = Arc::new(BatchInteractor::new(
            Arc::clone(&split_interactor),
            fs_port,
            VideoExtensions::new(&config.split.extensions),
        ));

        Ok(Self {
            split_interactor,
            batch_interactor,
        })
    }

    fn creation_port(config: &AppConfig) -> SplitResult<Arc<dyn CreationTimePort>> {
        let metadata = &config.metadata;
        let port: Arc<dyn CreationTimePort> = match metadata.source {
            CreationTimeSource::Hachoir => Arc::new(HachoirMetadataAdapter::new(
                metadata.command.clone(),
                metadata.label.clone(),
                metadata.format.clone(),
            )),
            CreationTimeSource::Container => Arc::new(ContainerMetadataAdapter::new()?),
            CreationTimeSource::None => Arc::new(NoCreationTime),
        };
        Ok(port)
    }
}

impl AppContainer for DefaultAppContainer {
    fn split_interactor(&self) -> Arc<SplitInteractor> {
        Arc::clone(&self.split_interactor)
    }

    fn batch_interactor(&self) -> Arc<BatchInteractor> {
        Arc::clone(&self.batch_interactor)
    }
}
