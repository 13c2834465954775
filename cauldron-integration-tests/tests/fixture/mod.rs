pub mod cauldron_fixture;
