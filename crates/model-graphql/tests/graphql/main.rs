mod fixture;
mod mutations;
mod queries;
mod schema;
mod uploads;
