use flex_error::define_error;

define_error! {
    #[derive(Debug, PartialEq, Eq)]
    CommitmentError {
        EmptyCommitmentPrefix
            |_| { "empty commitment prefix" },

        EmptyCommitmentProof
            |_| { "empty commitment proof" },
    }
}
