mod output_contracts;
mod support;
