pub mod cooccurrence_pipeline;

pub use cooccurrence_pipeline::CoOccurrencePipeline;
