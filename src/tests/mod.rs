#[cfg(test)]
mod test_server;

#[cfg(test)]
mod normalizer_tests;


#[cfg(test)]
mod http_client_tests;



#[cfg(test)]
mod instance_lock_tests;
