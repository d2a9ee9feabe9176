#[macro_export]
macro_rules! on_option {
    ( $e:expr, $err_exp:expr ) => {
        match $e {
            Some(x) => x,
            None => { $err_exp },
        }
    }
}

/// Unwrap value. Return ```Ok(x)``` or performs action on error
///
/// Example
/// ```
/// use vkverify::on_error;
///
/// fn select_queue() -> Result<u32, &'static str> {
///     let family: Result<u32, &'static str> = Ok(0);
///
///     let index = on_error!(family, return Err("No suitable queue family"));
///
///     Ok(index)
/// }
/// ```
#[macro_export]
macro_rules! on_error {
    ( $e:expr, $err_exp:expr ) => {
        match $e {
            Ok(x) => x,
            Err(_) => { $err_exp },
        }
    }
}

#[macro_export]
macro_rules! on_error_ret {
    ( $e:expr, $err_exp:expr ) => {
        $crate::on_error!($e, return Err($err_exp))
    }
}

#[macro_export]
macro_rules! on_option_ret {
    ( $e:expr, $err_exp:expr ) => {
        $crate::on_option!($e, return Err($err_exp))
    }
}
