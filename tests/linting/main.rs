mod algorithms;
mod grammar;
mod samples;
