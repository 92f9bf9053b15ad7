mod test_retry_exhaustion;
