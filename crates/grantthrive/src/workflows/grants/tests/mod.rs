mod routing;
mod service;
