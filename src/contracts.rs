//! ABI bindings for the two external contracts.
//!
//! `IPaymentRequests` is the payment-requests NFT contract: an ERC-721
//! Enumerable collection where each token is one payment request. `IERC20`
//! carries only the approve/allowance subset the settlement flow touches.

use alloy_sol_types::sol;

sol! {
    #[allow(missing_docs)]
    #[allow(clippy::too_many_arguments)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IPaymentRequests {
        struct PaymentDetails {
            address receiver;
            address payee;
            address token;
            uint256 amount;
            bool paid;
            string description;
        }

        function getPaymentDetails(uint256 tokenId) external view returns (PaymentDetails memory);

        function balanceOf(address owner) external view returns (uint256);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);

        function createdBalanceOf(address creator) external view returns (uint256);
        function tokenOfCreatorByIndex(address creator, uint256 index) external view returns (uint256);

        function createPaymentRequest(address token, address payee, uint256 amount, string calldata description) external returns (uint256);
        function settlePaymentRequest(uint256 tokenId) external;
        function cancelPaymentRequest(uint256 tokenId) external;

        event PaymentRequestCreated(uint256 indexed tokenId, address indexed creator, address indexed payee, address token, uint256 amount);
        event PaymentRequestSettled(uint256 indexed tokenId, address indexed payer);
        event PaymentRequestCancelled(uint256 indexed tokenId);
    }

    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}
