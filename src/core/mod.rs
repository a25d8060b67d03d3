// Domain-layer modules and shared errors/models
pub mod ad_group_name {
    pub use crate::ad_group_name::*;
}

pub mod creative_builder {
    pub use crate::creative_builder::*;
}

pub mod smart_creative {
    pub use crate::smart_creative::*;
}

pub mod pipeline {
    pub use crate::pipeline::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
