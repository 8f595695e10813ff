mod http_fetch;
