// Core trading domain entities and value objects
pub mod decision;
