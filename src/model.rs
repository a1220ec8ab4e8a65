pub mod history;
pub mod notifications;
pub mod registry;
pub mod stores;
pub mod widget;

pub use registry::{RegistryError, SavedLayout, WidgetConfig, WidgetRegistry};
pub use stores::Stores;
pub use widget::{WidgetDescriptor, WidgetId, WidgetKind};
