// Application layer - Use case interactors

pub mod batch_interactor;
pub mod container;
pub mod split_interactor;

// Re-export interactors
pub use batch_interactor::BatchInteractor;
pub use container::{AppContainer, DefaultAppContainer};
pub use split_interactor::{SplitInteractor, SplitOptions};
