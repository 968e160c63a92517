pub mod fixtures;
pub mod mock_broker;
pub mod mock_factory;
