//! Service layer

pub mod classifier;
pub mod identity;
pub mod lifecycle;
pub mod reconciler;

pub use classifier::{Classifier, ClassifierError, GeminiClient, ImageData};
pub use identity::{IdentityProvider, SqliteIdentityProvider};
pub use lifecycle::{LifecycleController, LifecycleError, NewSighting, SightingPatch};
pub use reconciler::{Identification, IdentifyError, Reconciler};
