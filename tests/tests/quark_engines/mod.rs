mod actions;
mod logic;
mod tasks;
mod timers;
