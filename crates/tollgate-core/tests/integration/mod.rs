mod stateful;
mod stateless;
