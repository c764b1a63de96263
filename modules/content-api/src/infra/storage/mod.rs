pub mod fixture;
pub mod memory;

pub use fixture::ContentFixture;
pub use memory::InMemoryContentStore;
