#[cfg(test)]
mod bundle_tests;
#[cfg(test)]
mod flit_tests;
#[cfg(test)]
mod master_tests;
