pub mod entities;
pub mod enums;
pub mod report;
pub mod soap;

pub use entities::EntityBag;
pub use enums::{EntityCategory, Intent, InvalidEnum, SentimentLabel, Severity};
pub use report::AnalysisReport;
pub use soap::{Assessment, Objective, Plan, SoapNote, Subjective};
