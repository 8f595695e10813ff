mod bootstrap;
mod eviction;
mod lifecycle;
