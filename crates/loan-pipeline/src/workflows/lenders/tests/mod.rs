mod acceptance;
mod common;
