#[macro_export]
macro_rules! str {
    ($s:expr) => {
        $s.to_string()
    };
    () => {
        "".to_string()
    };
}

#[macro_export]
macro_rules! subst {
    () => {
        $crate::typing::Subst::new()
    };

    ( $( $k:expr => $v:expr ),+ $(,)? ) => {{
        let mut s = $crate::typing::Subst::new();
        $(s.insert($k, $v);)+
        s
    }};
}
