pub mod country;
pub mod renderer;
