mod plan;

pub use plan::HikePlanDto;
