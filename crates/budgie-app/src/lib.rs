// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod chart;
pub mod editor;
pub mod ids;
pub mod markup;
pub mod model;
pub mod request;
pub mod state;
pub mod totals;

pub use chart::*;
pub use editor::*;
pub use ids::*;
pub use model::*;
pub use request::*;
pub use state::*;
pub use totals::*;
