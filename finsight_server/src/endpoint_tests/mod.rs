mod banking;
mod helpers;
mod misc;
mod mocks;
