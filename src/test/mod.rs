mod placement;
mod report;
mod runner;
mod sim_time;
mod simulator;
