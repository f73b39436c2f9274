//! Per-concern analysis passes over a loaded [`Book`](crate::book::Book).

pub mod collection;
pub mod language;
pub mod level;
pub mod settings;
pub mod suitability;
pub mod text;

pub use collection::{CollectionDescriptor, DescriptorInputs};
pub use language::{LanguageSet, LanguageSlot, Location};
pub use level::ReadingLevel;
pub use settings::{EpubMode, FolderLock, GeneratorVersion, PublishSettings, SettingsResolution};
pub use suitability::{EpubVerdict, Unsuitability};
pub use text::{CaseMapping, WordCountOptions, WordCounter, count_words};
