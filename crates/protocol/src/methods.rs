//! DevTools method and event names.

pub const PAGE_ENABLE: &str = "Page.enable";
pub const PAGE_NAVIGATE: &str = "Page.navigate";
pub const PAGE_PRINT_TO_PDF: &str = "Page.printToPDF";
pub const PAGE_LOAD_EVENT_FIRED: &str = "Page.loadEventFired";

pub const RUNTIME_ENABLE: &str = "Runtime.enable";
pub const RUNTIME_EVALUATE: &str = "Runtime.evaluate";
pub const RUNTIME_CONSOLE_API_CALLED: &str = "Runtime.consoleAPICalled";
pub const RUNTIME_EXCEPTION_THROWN: &str = "Runtime.exceptionThrown";

pub const NETWORK_ENABLE: &str = "Network.enable";
pub const NETWORK_CLEAR_BROWSER_CACHE: &str = "Network.clearBrowserCache";
pub const NETWORK_SET_COOKIES: &str = "Network.setCookies";
pub const NETWORK_SET_EXTRA_HTTP_HEADERS: &str = "Network.setExtraHTTPHeaders";
