mod harness;

mod async_await;
mod basics;
mod classes;
mod collections;
mod enums_generics;
mod errors;
mod fixtures;
mod nullish;
