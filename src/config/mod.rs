pub mod settings;

pub use settings::{
    ApiSettings, AppSettings, FetchSettings, MetadataSettings, NormalizerSettings, Settings,
};
