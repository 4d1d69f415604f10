mod sink;
mod startup;
