mod scenario;

mod clone;
