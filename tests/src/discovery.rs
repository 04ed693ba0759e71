mod integration;
mod ping;
